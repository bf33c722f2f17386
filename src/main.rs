mod app;
mod ui;

use app::TriageApp;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("imgtriage=info".parse().expect("static directive")),
        )
        .init();

    let app = TriageApp::new();
    std::process::exit(app.run());
}
