pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("secrets_manager=info".parse().unwrap()),
        )
        .with_target(false)
        .init();
}
