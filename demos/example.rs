use std::time::Duration;

use propbind::{ConfigStore, Schema};

fn main() -> Result<(), propbind::Error> {
    let schema = Schema::from_toml_str(include_str!("service.schema.toml"))?;

    // File values first, then environment overrides such as DEMO_LISTEN_PORT=9000
    let store = match ConfigStore::builder()
        .with_file("demos/service.properties", true)
        .with_env_prefix("DEMO")
        .build_validated(schema)
    {
        Ok(store) => store,
        Err(propbind::Error::Validation(report)) => {
            eprintln!("{report}");
            std::process::exit(1);
        }
        Err(e) => return Err(e),
    };

    let name: String = store.require("name")?;
    let port = store.get_int("listen_port")?.unwrap_or(8080);
    let timeouts: Vec<Duration> = store.get_collection("timeouts")?.unwrap_or_default();
    println!("{name} listening on {port}, timeouts {timeouts:?}");

    if let Some(mqtt) = store.embedded("mqtt") {
        let url: String = mqtt.require("url")?;
        println!("MQTT broker: {url}");
    }

    println!("\n{store}");
    Ok(())
}
