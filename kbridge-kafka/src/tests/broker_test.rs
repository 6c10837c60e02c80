use super::*;
use crate::broker::client_config;

#[rstest]
fn default_options_use_process_config(kafka_config: KafkaConfig) {
    let config = client_config(&kafka_config, &ConnectOptions::default());

    assert_eq!(config.get("bootstrap.servers"), Some("localhost:9092"));
    assert_eq!(config.get("client.id"), Some("kbridge-kafka-client"));
    assert_eq!(config.get("session.timeout.ms"), Some("10000"));
    assert_eq!(config.get("security.protocol"), None);
}

#[rstest]
fn request_brokers_override_bootstrap(kafka_config: KafkaConfig) {
    let options = ConnectOptions {
        brokers: Some(vec!["k1:9092".to_owned(), "k2:9092".to_owned()]),
        ..Default::default()
    };

    let config = client_config(&kafka_config, &options);

    assert_eq!(config.get("bootstrap.servers"), Some("k1:9092,k2:9092"));
}

#[rstest]
fn empty_broker_list_falls_back(kafka_config: KafkaConfig) {
    let options = ConnectOptions {
        brokers: Some(Vec::new()),
        ..Default::default()
    };

    let config = client_config(&kafka_config, &options);

    assert_eq!(config.get("bootstrap.servers"), Some("localhost:9092"));
}

#[rstest]
#[case(None, Some(true), Some("SSL"))]
#[case(Some("plain"), None, Some("SASL_PLAINTEXT"))]
#[case(Some("scram-sha-256"), Some(true), Some("SASL_SSL"))]
#[case(None, Some(false), None)]
fn security_protocol_follows_options(
    kafka_config: KafkaConfig,
    #[case] mechanism: Option<&str>,
    #[case] ssl: Option<bool>,
    #[case] expected: Option<&str>,
) {
    let options = ConnectOptions {
        sasl: mechanism.map(|m| Sasl {
            mechanism: m.to_owned(),
            username: "user".to_owned(),
            password: "secret".to_owned(),
        }),
        ssl,
        ..Default::default()
    };

    let config = client_config(&kafka_config, &options);

    assert_eq!(config.get("security.protocol"), expected);
}

#[rstest]
fn sasl_credentials_are_forwarded(kafka_config: KafkaConfig) {
    let options = ConnectOptions {
        sasl: Some(Sasl {
            mechanism: "scram-sha-512".to_owned(),
            username: "user".to_owned(),
            password: "secret".to_owned(),
        }),
        ..Default::default()
    };

    let config = client_config(&kafka_config, &options);

    assert_eq!(config.get("sasl.mechanisms"), Some("SCRAM-SHA-512"));
    assert_eq!(config.get("sasl.username"), Some("user"));
    assert_eq!(config.get("sasl.password"), Some("secret"));
}
