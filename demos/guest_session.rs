use dotenvy::dotenv;
use ferritmdb::{
    client::{SessionRef, TmdbClientBuilder},
    prelude::*,
    session::GuestSessionManager,
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

    // guest sessions don't need the user's approval
    let session_manager = GuestSessionManager::new(tmdb_client.clone());
    let guest_session_id = session_manager
        .register_new_session()
        .await
        .expect("failed to create guest session");

    println!("Guest session: {}", guest_session_id);

    let status = tmdb_client
        .rate_movie(550, 8.5, SessionRef::Guest(&guest_session_id))
        .send_async()
        .await
        .unwrap();

    println!("Rated Fight Club: {}", status.status_message);

    session_manager
        .delete_session()
        .await
        .expect("failed to delete guest session");
}
