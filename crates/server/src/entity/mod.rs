pub mod revoked_session;
