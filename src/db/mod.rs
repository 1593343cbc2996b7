pub mod connection;
pub mod memory;
pub mod mongo;
pub mod repository;

pub use memory::InMemoryPollRepository;
pub use mongo::MongoPollRepository;
pub use repository::PollRepository;
