use dotenvy::dotenv;
use ferritmdb::{
    client::TmdbClientBuilder,
    prelude::*,
    session::{GrantReceiverConfigBuilder, SessionManager},
};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    let tmdb_client = TmdbClientBuilder::new(
        std::env::var("TMDB_READ_ACCESS_TOKEN").expect("TMDB read access token not in environment"),
    )
    .build()
    .expect("failed to build TMDB client");

    // the listener defaults to http://localhost:8895/Approved; TMDB_GRANT_RECEIVER_* variables override it
    let grant_receiver_config = GrantReceiverConfigBuilder::from_env()
        .build()
        .expect("invalid grant receiver configuration");

    let session_manager =
        SessionManager::new(tmdb_client.clone()).with_grant_receiver_config(grant_receiver_config);

    // opens the consent page in the browser and waits for the user to approve or deny the request
    let session_id = session_manager
        .register_new_session()
        .await
        .expect("failed to register new session");

    let account = tmdb_client.account_details(&session_id).send_async().await.unwrap();
    println!(
        "Logged in as {} ({})",
        account.username(),
        account.name().unwrap_or("no name set")
    );

    session_manager.delete_session().await.expect("failed to delete session");
}
