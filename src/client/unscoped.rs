use reqwest::Method;

use super::{private::BuildHttpRequest, RequestBuilder, API_MOVIE_ENDPOINT, API_SEARCH_MOVIE_ENDPOINT};
use crate::model::{
    movie::{Movie, MovieSummary},
    page::Page,
};

const SEARCH_QUERY: &str = "query";

/// All unscoped TMDB endpoints. The functions in this trait do not require a user session. [TmdbClient] implements this
/// trait.
///
/// [TmdbClient]: super::TmdbClient
pub trait UnscopedClient
where
    Self: BuildHttpRequest + Clone + Sized,
{
    /// Get the details of a single movie identified by its TMDB ID.
    ///
    /// Translated fields may be requested with the [`language`-function in the request builder this function
    /// returns](RequestBuilder::language). A movie that doesn't exist results in a 404
    /// [Request-error](crate::error::Error::Request).
    fn movie(&self, movie_id: u64) -> RequestBuilder<Self, Movie> {
        RequestBuilder::new(Method::GET, format!("{}/{}", API_MOVIE_ENDPOINT, movie_id), self.clone())
    }

    /// Search for movies by their original, translated and alternative titles.
    ///
    /// The results are paged; the request builder this function returns has [`page`](RequestBuilder::page),
    /// [`year`](RequestBuilder::year) and [`include_adult`](RequestBuilder::include_adult) options.
    fn search_movies<S>(&self, query: S) -> RequestBuilder<Self, Page<MovieSummary>>
    where
        S: Into<String>,
    {
        RequestBuilder::new(Method::GET, API_SEARCH_MOVIE_ENDPOINT, self.clone()).append_query(SEARCH_QUERY, query.into())
    }
}
