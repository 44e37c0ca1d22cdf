pub mod system;
pub mod usecases;
