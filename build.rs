// build.rs

use std::env;

fn main() -> anyhow::Result<()> {
    // Necessary because of this issue: https://github.com/rust-lang/cargo/issues/9641
    // see also https://github.com/rust-lang/cargo/issues/9554
    #[cfg(feature = "espidf")]
    {
        embuild::build::CfgArgs::output_propagated("ESP_IDF")?;
        embuild::build::LinkArgs::output_propagated("ESP_IDF")?;
    }

    for (name, default) in [
        ("WIFI_SSID", "internet"),
        ("WIFI_PASS", "password"),
        ("API_PORT", "80"),
        ("BACKEND_URL", "http://airpurifier.local:3000"),
        ("BACKEND_USER", "device"),
        ("BACKEND_PASS", "password"),
    ] {
        let value = env::var(name).unwrap_or_else(|_| default.into());
        println!("cargo:rerun-if-env-changed={name}");
        println!("cargo:rustc-env={name}={value}");
    }

    Ok(())
}

// EOF
