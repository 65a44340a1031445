pub mod haptic;
pub mod imu;
pub mod nvs_log;
pub mod oled;
