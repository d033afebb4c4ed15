#[cfg(test)]
pub mod mock_db;
pub mod organization_repository;
pub mod postgres_organization_repository;
