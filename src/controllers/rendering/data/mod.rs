pub mod swap_data;
