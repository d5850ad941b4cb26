use dotenvy::dotenv;
use ferritmdb::{client::TmdbClientBuilder, prelude::*, Error};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    let tmdb_client = TmdbClientBuilder::new(
        std::env::var("TMDB_READ_ACCESS_TOKEN").expect("TMDB read access token not in environment"),
    )
    .build()
    .expect("failed to build TMDB client");

    let movie = match tmdb_client.movie(550).language("en-US").send_async().await {
        Ok(movie) => movie,
        Err(Error::Throttled { retry_after }) => {
            eprintln!("Rate limited, try again in {} seconds", retry_after);
            return;
        }
        Err(err) => panic!("failed to get movie: {}", err),
    };

    println!("{} ({})", movie.title(), movie.release_date().unwrap_or("unreleased"));

    if let Some(tagline) = movie.tagline() {
        println!("{}", tagline);
    }

    let genres: Vec<&str> = movie.genres().iter().map(|genre| genre.name.as_str()).collect();
    println!("Genres: {}", genres.join(", "));

    if let Some(runtime) = movie.runtime() {
        println!("Runtime: {} min", runtime);
    }
}
