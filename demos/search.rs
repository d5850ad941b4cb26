use dotenvy::dotenv;
use ferritmdb::{client::TmdbClientBuilder, prelude::*};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    let tmdb_client = TmdbClientBuilder::new(
        std::env::var("TMDB_READ_ACCESS_TOKEN").expect("TMDB read access token not in environment"),
    )
    .build()
    .expect("failed to build TMDB client");

    let first_page = tmdb_client
        .search_movies("blade runner")
        .language("en-US")
        .send_async()
        .await
        .unwrap();

    println!("First page of {}:", first_page.total_pages());
    for movie in first_page.results() {
        println!(
            "{} ({}) [{}]",
            movie.title(),
            movie.release_date().unwrap_or("unreleased"),
            movie.id()
        );
    }

    if let Some(next_page) = first_page.next_page() {
        let second_page = tmdb_client
            .search_movies("blade runner")
            .language("en-US")
            .page(next_page)
            .send_async()
            .await
            .unwrap();

        println!("\nSecond page:");
        for movie in second_page.results() {
            println!(
                "{} ({}) [{}]",
                movie.title(),
                movie.release_date().unwrap_or("unreleased"),
                movie.id()
            );
        }
    }
}
