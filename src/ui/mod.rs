pub mod buyers;
pub mod panels;
