pub mod users;
pub mod events;
pub mod categories;
pub mod teams;
pub mod players;
pub mod auction_states;
pub mod bids;

pub use users::Entity as Users;
pub use events::Entity as Events;
pub use categories::Entity as Categories;
pub use teams::Entity as Teams;
pub use players::Entity as Players;
pub use auction_states::Entity as AuctionStates;
pub use bids::Entity as Bids;
