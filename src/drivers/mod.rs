pub mod vn100;
