pub mod discount_code;
