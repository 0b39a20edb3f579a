fn main() {
    // napi_build only matters when the N-API bridge is compiled in.
    if std::env::var_os("CARGO_FEATURE_NAPI").is_some() {
        napi_build::setup();
    }
}
