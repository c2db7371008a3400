pub use sea_orm_migration::prelude::*;

mod m20250101_000000_init_schema;
mod m20250102_000001_category_base_price;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000000_init_schema::Migration),
            Box::new(m20250102_000001_category_base_price::Migration),
        ]
    }
}
