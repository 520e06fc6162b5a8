pub mod youdu;
