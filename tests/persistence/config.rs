//! Configuration through `modelvault.toml`.

use crate::common::*;
use modelvault::{
    Error, ModelStore, PersistenceEngine, SaveOptions, TempModelFile, Value, VaultConfig,
    CONFIG_FILE_NAME,
};
use std::sync::Arc;

#[test]
fn config_round_trips_through_toml() {
    let t = TestPath::new(CONFIG_FILE_NAME);
    let config = VaultConfig {
        chunk_size: 1024,
        file_suffix: ".weights".to_string(),
        sync_on_close: false,
    };
    config.write_to_file(&t.path).unwrap();
    assert_eq!(VaultConfig::from_file(&t.path).unwrap(), config);
}

#[test]
fn invalid_config_is_rejected() {
    let t = TestPath::new(CONFIG_FILE_NAME);
    std::fs::write(&t.path, "chunk_size = 0\n").unwrap();
    assert!(matches!(VaultConfig::from_file(&t.path), Err(Error::InvalidConfig(_))));

    std::fs::write(&t.path, "chunk_size = [1, 2]\n").unwrap();
    assert!(matches!(VaultConfig::from_file(&t.path), Err(Error::InvalidConfig(_))));
}

#[test]
fn configured_chunk_size_is_recorded() {
    let e = PersistenceEngine::from_config(VaultConfig {
        chunk_size: 100,
        ..VaultConfig::default()
    })
    .unwrap();

    let t = TestPath::new("b.mvlt");
    e.save(&t.path, Value::Bytes(pattern(250)), SaveOptions::new())
        .unwrap();
    let (chunksize, chunks) = e
        .load_with(&t.path, |d, root| {
            let chunksize = root.require_attr("chunksize")?.as_int();
            Ok((chunksize, d.into_chunks().expect("chunks").len()?))
        })
        .unwrap();
    assert_eq!(chunksize, Some(100));
    assert_eq!(chunks, 3);
}

#[test]
fn configured_suffix_names_temp_files() {
    let e = PersistenceEngine::from_config(VaultConfig {
        file_suffix: ".h5".to_string(),
        sync_on_close: false,
        ..VaultConfig::default()
    })
    .unwrap();
    let file = TempModelFile::new(Arc::new(e)).unwrap();
    assert_eq!(file.path().extension().unwrap(), "h5");
}

#[test]
fn configured_store_uses_its_config_file() {
    let t = TestPath::new("unused");
    std::fs::write(t.dir.path().join(CONFIG_FILE_NAME), "chunk_size = 10\n").unwrap();

    let store = ModelStore::open_configured(t.dir.path()).unwrap();
    assert_eq!(store.engine().config().chunk_size, 10);

    store.save("b.mvlt", Value::Bytes(pattern(25)), SaveOptions::new()).unwrap();
    let chunks = store
        .load_with("b.mvlt", |d, _| d.into_chunks().expect("chunks").len())
        .unwrap();
    assert_eq!(chunks, 3);
    // The config file is not a model
    assert_eq!(store.list_by_updated_at(true).unwrap().len(), 1);
}
