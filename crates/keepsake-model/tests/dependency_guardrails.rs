// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

#[test]
fn model_crate_has_no_store_client_or_server_dependency() {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let cargo_toml =
        std::fs::read_to_string(manifest_dir.join("Cargo.toml")).expect("read Cargo.toml");
    for forbidden in [
        "keepsake-store",
        "keepsake-client",
        "keepsake-server",
        "keepsake-cli",
    ] {
        assert!(
            !cargo_toml.contains(forbidden),
            "forbidden dependency in model crate: {forbidden}"
        );
    }
}
