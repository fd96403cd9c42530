use crate::core::models::{escape_html, CovidStats, NewsArticle};
use crate::core::scheduler::ScheduledUpdate;
use std::fmt::Write;

pub const PAGE_TITLE: &str = "Covid Dashboard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpdate {
    pub label: String,
    pub description: String,
}

impl From<&ScheduledUpdate> for PendingUpdate {
    fn from(update: &ScheduledUpdate) -> Self {
        Self {
            label: update.label.clone(),
            description: update.description.clone(),
        }
    }
}

/// Everything the dashboard page shows.
#[derive(Debug, Clone)]
pub struct Page {
    pub stats: Option<CovidStats>,
    pub articles: Vec<NewsArticle>,
    pub updates: Vec<PendingUpdate>,
    pub refresh_seconds: u32,
}

fn link(param: &str, value: &str) -> String {
    escape_html(&format!("/index?{}={}", param, urlencoding::encode(value)))
}

impl Page {
    pub fn render(&self) -> String {
        let mut html = String::with_capacity(4096);

        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        if self.refresh_seconds > 0 {
            let _ = writeln!(
                html,
                "<meta http-equiv=\"refresh\" content=\"{}; url=/index\">",
                self.refresh_seconds
            );
        }
        let _ = writeln!(html, "<title>{PAGE_TITLE}</title>\n</head>\n<body>");
        let _ = writeln!(html, "<h1>{PAGE_TITLE}</h1>");

        self.render_updates(&mut html);
        self.render_stats(&mut html);
        render_schedule_form(&mut html);
        self.render_articles(&mut html);

        html.push_str("</body>\n</html>\n");
        html
    }

    fn render_stats(&self, html: &mut String) {
        html.push_str("<section class=\"stats\">\n");

        match &self.stats {
            Some(stats) => {
                let _ = writeln!(
                    html,
                    "<h2>{}</h2>\n<p>Last 7 days infection rate: {}</p>",
                    escape_html(&stats.area),
                    stats.local_7day_cases
                );
                let _ = writeln!(
                    html,
                    "<h2>{}</h2>\n<p>Last 7 days infection rate: {}</p>",
                    escape_html(&stats.nation),
                    stats.national_7day_cases
                );
                let _ = writeln!(
                    html,
                    "<p>{}</p>\n<p>{}</p>",
                    stats.hospital_cases_label(),
                    stats.total_deaths_label()
                );
            }
            None => html.push_str("<p>Covid data unavailable</p>\n"),
        }

        html.push_str("</section>\n");
    }

    fn render_updates(&self, html: &mut String) {
        html.push_str("<section class=\"updates\">\n<h2>Scheduled updates</h2>\n<ul>\n");

        for update in &self.updates {
            let _ = writeln!(
                html,
                "<li><strong>{}</strong> {} <a href=\"{}\">cancel</a></li>",
                escape_html(&update.label),
                escape_html(&update.description),
                link("update_item", &update.label)
            );
        }

        html.push_str("</ul>\n</section>\n");
    }

    fn render_articles(&self, html: &mut String) {
        html.push_str("<section class=\"news\">\n<h2>News</h2>\n<ul>\n");

        for article in &self.articles {
            // content is already escaped when the article is formatted
            let _ = writeln!(
                html,
                "<li><strong>{}</strong> <a href=\"{}\">&times;</a><p>{}</p></li>",
                escape_html(&article.title),
                link("notif", &article.title),
                article.content
            );
        }

        html.push_str("</ul>\n</section>\n");
    }
}

fn render_schedule_form(html: &mut String) {
    html.push_str(concat!(
        "<form action=\"/index\" method=\"get\" class=\"schedule\">\n",
        "<input type=\"time\" name=\"update\" required>\n",
        "<input type=\"text\" name=\"two\" placeholder=\"Update label\" required>\n",
        "<label><input type=\"checkbox\" name=\"repeat\" value=\"repeat\"> Repeat daily</label>\n",
        "<label><input type=\"checkbox\" name=\"covid-data\" value=\"covid-data\"> Covid data</label>\n",
        "<label><input type=\"checkbox\" name=\"news\" value=\"news\"> News</label>\n",
        "<button type=\"submit\">Schedule update</button>\n",
        "</form>\n",
    ));
}
