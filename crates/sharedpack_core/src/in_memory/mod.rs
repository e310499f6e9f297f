mod in_memory_project;

pub use in_memory_project::InMemoryProject;
