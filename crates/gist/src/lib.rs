pub mod client;

pub use client::GistClient;
