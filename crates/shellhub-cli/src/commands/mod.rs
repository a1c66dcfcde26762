pub mod publish;
pub mod request;
pub mod route;
pub mod shell;
pub mod submodel;
