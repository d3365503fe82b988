#[derive(Debug, PartialEq)]
pub enum Route<'a> {
    Unknown,
    Greeting,
    ListCharacters,
    GetCharacter { id: &'a str },
    Healthz,
    Metrics,
}

impl Route<'_> {
    pub fn action_name(&self) -> &'static str {
        match self {
            Route::Unknown => "unknown",
            Route::Greeting => "greeting",
            Route::ListCharacters => "list-characters",
            Route::GetCharacter { .. } => "get-character",
            Route::Healthz => "healthz",
            Route::Metrics => "metrics",
        }
    }
}
