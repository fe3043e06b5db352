use crate::api::handlers::{
    about, admin, articles, book_requests, books, events, feedback, galleries, health,
    home_book_slider, languages, questions, share, stats, tags, topics, translators, writers,
};
use utoipa::openapi::{Contact, InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI spec.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and included in the generated `OpenAPI` spec. Handlers sharing a path go in
/// the same `routes!` call. Routes added outside (`OPTIONS /health`, the
/// rendered site) are not documented.
pub(crate) fn api_router() -> OpenApiRouter {
    let mut spec = cargo_openapi();
    spec.tags = Some(tags());
    let router = OpenApiRouter::with_openapi(spec)
        .routes(routes!(health::health))
        .routes(routes!(health::live))
        .routes(routes!(health::ready))
        // articles
        .routes(routes!(articles::create_article, articles::list_articles))
        .routes(routes!(
            articles::get_article,
            articles::update_article,
            articles::delete_article
        ))
        .routes(routes!(articles::article_image))
        .routes(routes!(articles::publish_article))
        // events
        .routes(routes!(events::create_event, events::list_events))
        .routes(routes!(
            events::get_event,
            events::update_event,
            events::delete_event
        ))
        .routes(routes!(events::event_image))
        // books
        .routes(routes!(books::create_book, books::list_books))
        .routes(routes!(stats::counts))
        .routes(routes!(books::get_book, books::update_book, books::delete_book))
        .routes(routes!(books::book_cover))
        .routes(routes!(books::book_attachment))
        .routes(routes!(
            home_book_slider::create_slide,
            home_book_slider::list_slides
        ))
        .routes(routes!(
            home_book_slider::get_slide,
            home_book_slider::update_slide,
            home_book_slider::delete_slide
        ))
        .routes(routes!(home_book_slider::slide_image))
        .routes(routes!(
            book_requests::request_book,
            book_requests::list_book_requests
        ))
        // questions
        .routes(routes!(questions::create_question, questions::list_questions))
        .routes(routes!(questions::questions_by_tag))
        .routes(routes!(
            questions::get_question,
            questions::update_question,
            questions::delete_question
        ))
        .routes(routes!(questions::question_image))
        // people
        .routes(routes!(writers::create_writer, writers::list_writers))
        .routes(routes!(
            writers::get_writer,
            writers::update_writer,
            writers::delete_writer
        ))
        .routes(routes!(writers::writer_image))
        .routes(routes!(
            translators::create_translator,
            translators::list_translators
        ))
        .routes(routes!(
            translators::get_translator,
            translators::update_translator,
            translators::delete_translator
        ))
        .routes(routes!(translators::translator_image))
        // taxonomy
        .routes(routes!(topics::create_topic, topics::list_topics))
        .routes(routes!(
            topics::get_topic,
            topics::update_topic,
            topics::delete_topic
        ))
        .routes(routes!(topics::topic_image))
        .routes(routes!(tags::create_tag, tags::list_tags))
        .routes(routes!(tags::get_tag, tags::update_tag, tags::delete_tag))
        .routes(routes!(languages::create_language, languages::list_languages))
        .routes(routes!(
            languages::get_language,
            languages::update_language,
            languages::delete_language
        ))
        // galleries
        .routes(routes!(galleries::create_gallery, galleries::list_galleries))
        .routes(routes!(galleries::gallery_image))
        .routes(routes!(
            galleries::get_gallery,
            galleries::update_gallery,
            galleries::delete_gallery
        ))
        // about
        .routes(routes!(about::create_about, about::list_about))
        .routes(routes!(
            about::get_about,
            about::update_about,
            about::delete_about
        ))
        .routes(routes!(about::about_image))
        // visitors and admin
        .routes(routes!(feedback::create_feedback, feedback::list_feedback))
        .routes(routes!(feedback::get_feedback, feedback::delete_feedback))
        .routes(routes!(admin::list_content))
        .routes(routes!(share::share));

    router
}

fn tags() -> Vec<Tag> {
    [
        ("health", "Liveness, readiness and build information"),
        ("articles", "Multilingual articles"),
        ("events", "News and events"),
        ("books", "Books with cover image and PDF attachment"),
        ("homebookslider", "Book covers on the home page slider"),
        ("requestBook", "Requests for printed copies"),
        ("questions", "Questions and answers"),
        ("writers", "Writers and scholars"),
        ("translators", "Translators"),
        ("topics", "Topics"),
        ("tags", "Tags"),
        ("languages", "Languages"),
        ("galleries", "Photo galleries"),
        ("about", "About the masjid"),
        ("feedback", "Visitor feedback"),
        ("stats", "Content counters"),
        ("admin", "Admin listings, deleted records included"),
        ("share", "Link previews for social media"),
    ]
    .into_iter()
    .map(|(name, description)| {
        let mut tag = Tag::new(name);
        tag.description = Some(description.to_string());
        tag
    })
    .collect()
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();

    OpenApiBuilder::new().info(info).build()
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_author<'a>(author: &'a str) -> (Option<&'a str>, Option<&'a str>) {
    let non_empty = |value: &'a str| -> Option<&'a str> {
        let value = value.trim();
        (!value.is_empty()).then_some(value)
    };

    match author.find('<') {
        Some(start) => (
            non_empty(&author[..start]),
            non_empty(author[start + 1..].trim_end_matches('>')),
        ),
        None => (non_empty(author), None),
    }
}
