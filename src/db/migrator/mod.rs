use sea_orm_migration::prelude::*;

mod m20240101_create_user;
mod m20240102_create_post;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_create_user::Migration),
            Box::new(m20240102_create_post::Migration),
        ]
    }
}
