use actix_web::http::header::ContentType;
use actix_web::HttpResponse;
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "templates/"]
struct Assets;

#[derive(thiserror::Error, Debug)]
#[error("template {0} is missing from the build")]
pub struct MissingTemplate(String);

/// Lookup and rendering for the five confirmation/error pages. Templates are
/// embedded at compile time, so rendering never touches the filesystem.
#[derive(Clone)]
pub struct Templates;

impl Templates {
    pub fn render(
        &self,
        name: &str,
        values: &[(&str, &str)],
    ) -> Result<String, MissingTemplate> {
        let file = Assets::get(name).ok_or_else(|| MissingTemplate(name.to_owned()))?;
        let mut content = String::from_utf8_lossy(file.data.as_ref()).into_owned();
        for (key, value) in values {
            content = content.replace(
                &format!("{{{{ {} }}}}", key),
                &htmlescape::encode_minimal(value),
            );
        }
        Ok(content)
    }

    /// Render a template and wrap it as a `200 OK` HTML response.
    pub fn page(
        &self,
        name: &str,
        values: &[(&str, &str)],
    ) -> Result<HttpResponse, MissingTemplate> {
        Ok(HttpResponse::Ok()
            .content_type(ContentType::html())
            .body(self.render(name, values)?))
    }

    /// The generic error page. Falls back to a bare body rather than failing:
    /// this is the page every other failure is mapped to, so it must always
    /// produce a 200.
    pub fn error_page(&self) -> HttpResponse {
        let body = self
            .render("error.html", &[])
            .unwrap_or_else(|_| "<html><body><p>Something went wrong.</p></body></html>".into());
        HttpResponse::Ok().content_type(ContentType::html()).body(body)
    }
}
