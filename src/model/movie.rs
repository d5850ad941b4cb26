//! Everything related to movies.
//!
//! There are two kinds of movie objects: [Movie] and [MovieSummary].
//!
//! - [Movie]: all the details of a single movie. Retrieved from the
//!   [`movie`-function](crate::client::UnscopedClient::movie).
//! - [MovieSummary]: the abbreviated movie object contained in search results and lists. Retrieved from the
//!   [`search_movies`-function](crate::client::UnscopedClient::search_movies).

mod private {
    use serde::{Deserialize, Serialize};

    pub trait CommonFields {
        fn common_fields(&self) -> &CommonMovieFields;
    }

    /// Fields shared by both movie objects.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct CommonMovieFields {
        pub(crate) id: u64,
        pub(crate) title: String,
        pub(crate) original_title: String,
        pub(crate) original_language: String,
        pub(crate) overview: Option<String>,
        // unreleased movies have an empty release date instead of a null one
        #[serde(default, deserialize_with = "crate::model::empty_string_as_none")]
        pub(crate) release_date: Option<String>,
        pub(crate) poster_path: Option<String>,
        pub(crate) backdrop_path: Option<String>,
        #[serde(default)]
        pub(crate) adult: bool,
        #[serde(default)]
        pub(crate) popularity: f64,
        #[serde(default)]
        pub(crate) vote_average: f64,
        #[serde(default)]
        pub(crate) vote_count: u64,
    }
}

use serde::{Deserialize, Serialize};

use self::private::{CommonFields, CommonMovieFields};
use super::{Genre, ProductionCompany, SpokenLanguage};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(flatten)]
    common: CommonMovieFields,

    imdb_id: Option<String>,
    tagline: Option<String>,
    status: Option<String>,
    runtime: Option<u32>,
    #[serde(default)]
    budget: u64,
    #[serde(default)]
    revenue: u64,
    homepage: Option<String>,
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(default)]
    production_companies: Vec<ProductionCompany>,
    #[serde(default)]
    spoken_languages: Vec<SpokenLanguage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    #[serde(flatten)]
    common: CommonMovieFields,

    #[serde(default)]
    genre_ids: Vec<u32>,
}

/// Functions for retrieving information that is common to every movie object.
pub trait CommonMovieInformation: crate::private::Sealed {
    fn id(&self) -> u64;
    fn title(&self) -> &str;
    fn original_title(&self) -> &str;
    fn original_language(&self) -> &str;
    fn overview(&self) -> Option<&str>;
    /// The release date as `YYYY-MM-DD`, if the movie has one.
    fn release_date(&self) -> Option<&str>;
    fn poster_path(&self) -> Option<&str>;
    fn backdrop_path(&self) -> Option<&str>;
    fn adult(&self) -> bool;
    fn popularity(&self) -> f64;
    fn vote_average(&self) -> f64;
    fn vote_count(&self) -> u64;
}

impl CommonFields for Movie {
    fn common_fields(&self) -> &CommonMovieFields {
        &self.common
    }
}

impl CommonFields for MovieSummary {
    fn common_fields(&self) -> &CommonMovieFields {
        &self.common
    }
}

impl crate::private::Sealed for Movie {}
impl crate::private::Sealed for MovieSummary {}

impl<T> CommonMovieInformation for T
where
    T: CommonFields + crate::private::Sealed,
{
    fn id(&self) -> u64 {
        self.common_fields().id
    }

    fn title(&self) -> &str {
        &self.common_fields().title
    }

    fn original_title(&self) -> &str {
        &self.common_fields().original_title
    }

    fn original_language(&self) -> &str {
        &self.common_fields().original_language
    }

    fn overview(&self) -> Option<&str> {
        self.common_fields().overview.as_deref().filter(|overview| !overview.is_empty())
    }

    fn release_date(&self) -> Option<&str> {
        self.common_fields().release_date.as_deref()
    }

    fn poster_path(&self) -> Option<&str> {
        self.common_fields().poster_path.as_deref()
    }

    fn backdrop_path(&self) -> Option<&str> {
        self.common_fields().backdrop_path.as_deref()
    }

    fn adult(&self) -> bool {
        self.common_fields().adult
    }

    fn popularity(&self) -> f64 {
        self.common_fields().popularity
    }

    fn vote_average(&self) -> f64 {
        self.common_fields().vote_average
    }

    fn vote_count(&self) -> u64 {
        self.common_fields().vote_count
    }
}

impl Movie {
    pub fn imdb_id(&self) -> Option<&str> {
        self.imdb_id.as_deref()
    }

    pub fn tagline(&self) -> Option<&str> {
        self.tagline.as_deref().filter(|tagline| !tagline.is_empty())
    }

    /// The release status, e.g. `Released` or `Post Production`.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Runtime in minutes.
    pub fn runtime(&self) -> Option<u32> {
        self.runtime.filter(|runtime| *runtime > 0)
    }

    pub fn budget(&self) -> u64 {
        self.budget
    }

    pub fn revenue(&self) -> u64 {
        self.revenue
    }

    pub fn homepage(&self) -> Option<&str> {
        self.homepage.as_deref().filter(|homepage| !homepage.is_empty())
    }

    pub fn genres(&self) -> &[Genre] {
        &self.genres
    }

    pub fn production_companies(&self) -> &[ProductionCompany] {
        &self.production_companies
    }

    pub fn spoken_languages(&self) -> &[SpokenLanguage] {
        &self.spoken_languages
    }
}

impl MovieSummary {
    pub fn genre_ids(&self) -> &[u32] {
        &self.genre_ids
    }
}
