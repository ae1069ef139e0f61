pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_table;
mod m20240102_000001_create_recipes;
mod m20240103_000001_add_recipe_link;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_table::Migration),
            Box::new(m20240102_000001_create_recipes::Migration),
            Box::new(m20240103_000001_add_recipe_link::Migration),
        ]
    }
}
