use redis_cache::config::{Args, Config};

#[test]
fn config_get_known_params() {
    let cfg = Config { port: 6379, replicaof: None, dir: "/data".into(), dbfilename: "dump.rdb".into() };
    assert_eq!(cfg.get("dir"), Some("/data"));
    assert_eq!(cfg.get("DBFILENAME"), Some("dump.rdb"));
    assert_eq!(cfg.get("maxmemory"), None);
}

#[test]
fn from_args_without_replicaof_produces_a_standalone_config() {
    let args = Args { port: 7000, replicaof: None, dir: ".".into(), dbfilename: "dump.rdb".into() };
    let cfg = Config::from_args(args).unwrap();
    assert_eq!(cfg.port, 7000);
    assert!(cfg.replicaof.is_none());
}

#[test]
fn from_args_parses_replicaof_host_and_port() {
    let args = Args { port: 7000, replicaof: Some("localhost 6380".to_string()), dir: ".".into(), dbfilename: "dump.rdb".into() };
    let cfg = Config::from_args(args).unwrap();
    let replicaof = cfg.replicaof.unwrap();
    assert_eq!(replicaof.host, "localhost");
    assert_eq!(replicaof.port, 6380);
}

#[test]
fn from_args_with_a_malformed_replicaof_is_rejected() {
    let args = Args { port: 7000, replicaof: Some("not-a-port".to_string()), dir: ".".into(), dbfilename: "dump.rdb".into() };
    assert!(Config::from_args(args).is_err());
}
