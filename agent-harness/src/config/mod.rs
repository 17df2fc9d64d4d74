mod agent;
pub use agent::{Agent, Wallet};

mod credential;
pub use credential::Credential;

mod rendezvous;
pub use rendezvous::{Rendezvous, Simulation};

mod config;
pub use config::Config;

mod parser;
pub use parser::Parser;
