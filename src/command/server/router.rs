use hyper::{Method, Uri};

use super::route::Route;
use crate::upstream;

// HEAD resolves like GET, the body is dropped when responding
pub fn parse<'a>(method: &Method, uri: &'a Uri) -> Route<'a> {
    if *method != Method::GET && *method != Method::HEAD {
        return Route::Unknown;
    }

    match uri.path() {
        "/" => Route::Greeting,
        "/healthz" => Route::Healthz,
        "/metrics" => Route::Metrics,
        "/characters" | "/characters/" => Route::ListCharacters,
        path => try_parse_character(path).unwrap_or(Route::Unknown),
    }
}

fn try_parse_character(path: &str) -> Option<Route<'_>> {
    let id = path.strip_prefix("/characters/")?;
    let id = id.strip_suffix('/').unwrap_or(id);

    if !upstream::is_path_segment(id) {
        return None;
    }

    Some(Route::GetCharacter { id })
}
