pub mod user_postgres;

pub use user_postgres::UserPostgresRepository;
