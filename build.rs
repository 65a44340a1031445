fn main() {
    // The ESP-IDF link environment only exists when building the firmware.
    // Host builds (replay tool, tests) skip it.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}
