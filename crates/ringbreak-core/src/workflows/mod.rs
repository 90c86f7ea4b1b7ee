pub mod rbfe;
