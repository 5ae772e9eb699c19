pub mod backend;
pub mod error;
pub mod external_store;
pub mod ingest;
pub mod local_store;
pub mod object_repository;
pub mod object_service;
pub mod workspace_repository;
