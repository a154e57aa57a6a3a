use build_html::{Html, HtmlContainer, HtmlPage, Table};

use super::escape;
use super::styles::base_css;
use crate::model::{Report, ReportStats, SessionUser, UserProfile};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 登录页与注册页共用一个模板
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    Login,
    Register,
}

impl AuthAction {
    fn path(&self) -> &'static str {
        match self {
            AuthAction::Login => "/login",
            AuthAction::Register => "/register",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            AuthAction::Login => "Login",
            AuthAction::Register => "Register",
        }
    }
}

/// 列表中的一行报告；上报人仅在管理后台展示
pub struct ReportRow<'a> {
    pub report: &'a Report,
    pub username: Option<&'a str>,
    pub photo_url: String,
}

fn new_page(title: &str) -> HtmlPage {
    HtmlPage::new()
        .with_title(format!("RiverClean - {}", title))
        .with_meta(vec![("charset", "utf-8")])
        .with_meta(vec![
            ("name", "viewport"),
            ("content", "width=device-width, initial-scale=1"),
        ])
        .with_style(base_css())
}

fn nav(page: &mut HtmlPage, user: Option<(&str, bool)>) {
    page.add_raw("<nav><span class=\"brand\">RiverClean</span>");
    match user {
        Some((username, is_admin)) => {
            page.add_raw("<a href=\"/\">Detect</a><a href=\"/dashboard\">Dashboard</a>");
            if is_admin {
                page.add_raw("<a href=\"/admin\">Admin</a>");
            }
            page.add_raw(format!(
                "<span>{}</span><a href=\"/logout\">Logout</a>",
                escape(username)
            ));
        }
        None => page.add_raw("<a href=\"/login\">Login</a><a href=\"/register\">Register</a>"),
    }
    page.add_raw("</nav>");
}

fn flashes_html(flashes: &[String]) -> String {
    flashes
        .iter()
        .map(|msg| format!("<div class=\"flash\">{}</div>", escape(msg)))
        .collect()
}

pub fn login_page(action: AuthAction, flashes: &[String]) -> String {
    let mut page = new_page(action.title());
    nav(&mut page, None);

    page.add_raw("<main><div class=\"card\">");
    page.add_raw(format!("<h1>{}</h1>", action.title()));
    page.add_raw(flashes_html(flashes));
    page.add_raw(format!(
        "<form method=\"post\" action=\"{}\">\
         <label for=\"username\">Username</label>\
         <input type=\"text\" id=\"username\" name=\"username\" required autofocus>\
         <label for=\"password\">Password</label>\
         <input type=\"password\" id=\"password\" name=\"password\" required>\
         <button type=\"submit\">{}</button></form>",
        action.path(),
        action.title()
    ));
    let switch = match action {
        AuthAction::Login => "<p>No account yet? <a href=\"/register\">Register</a></p>",
        AuthAction::Register => "<p>Already registered? <a href=\"/login\">Login</a></p>",
    };
    page.add_raw(switch);
    page.add_raw("</div></main>");

    page.to_html_string()
}

pub fn detect_page(user: &SessionUser, allowed_extensions: &[String]) -> String {
    let mut page = new_page("Detect");
    nav(&mut page, Some((&user.username, user.is_admin)));

    let accept = allowed_extensions
        .iter()
        .map(|ext| format!(".{}", escape(ext)))
        .collect::<Vec<_>>()
        .join(",");

    page.add_raw("<main><div class=\"card\">");
    page.add_raw(format!(
        "<h1>Report a river</h1><p>Welcome, {}. Upload a photo of the river and we will check it for pollution.</p>",
        escape(&user.username)
    ));
    page.add_raw(format!(
        "<form id=\"detect-form\" enctype=\"multipart/form-data\">\
         <label for=\"photo\">River photo</label>\
         <input type=\"file\" id=\"photo\" name=\"photo\" accept=\"{}\" required>\
         <label for=\"location\">Location</label>\
         <input type=\"text\" id=\"location\" name=\"location\" placeholder=\"Unknown Location\">\
         <button type=\"submit\">Analyse</button></form>",
        accept
    ));
    page.add_raw("<div id=\"result\"></div>");
    page.add_raw("</div></main>");
    page.add_raw("<script src=\"/static/app.js\"></script>");

    page.to_html_string()
}

fn report_cells(row: &ReportRow<'_>) -> Vec<String> {
    let report = row.report;
    vec![
        format!(
            "<a href=\"{0}\"><img class=\"thumb\" src=\"{0}\" alt=\"river photo\"></a>",
            escape(&row.photo_url)
        ),
        format!(
            "<span class=\"category-{0}\">{0}</span>",
            report.category.as_str()
        ),
        escape(report.location.as_deref().unwrap_or("-")),
        format!(
            "<span class=\"status-{0}\">{0}</span>",
            report.status.as_str()
        ),
        report.timestamp.format(TIMESTAMP_FORMAT).to_string(),
    ]
}

pub fn dashboard_page(user: &SessionUser, profile: &UserProfile, rows: &[ReportRow<'_>]) -> String {
    let mut page = new_page("Dashboard");
    nav(&mut page, Some((&user.username, user.is_admin)));

    page.add_raw("<main><div class=\"card\">");
    page.add_raw(format!("<h1>{}</h1>", escape(&profile.username)));
    page.add_raw(format!(
        "<p>Reward points</p><p class=\"points\">{}</p>",
        profile.points
    ));
    page.add_raw("</div><div class=\"card\"><h2>My reports</h2>");

    if rows.is_empty() {
        page.add_raw("<p class=\"empty\">No reports yet.</p>");
    } else {
        let table = Table::from(rows.iter().map(report_cells).collect::<Vec<_>>())
            .with_header_row(["Photo", "Category", "Location", "Status", "Submitted"]);
        page.add_table(table);
    }
    page.add_raw("</div></main>");

    page.to_html_string()
}

pub fn admin_page(user: &SessionUser, rows: &[ReportRow<'_>], stats: &ReportStats) -> String {
    let mut page = new_page("Admin");
    nav(&mut page, Some((&user.username, user.is_admin)));

    page.add_raw("<main><div class=\"card\"><h1>Admin panel</h1>");
    let summary = Table::from([[
        stats.total_users.to_string(),
        stats.total_reports.to_string(),
        stats.polluted_reports.to_string(),
        stats.pending_polluted.to_string(),
        stats.resolved_polluted.to_string(),
    ]])
    .with_header_row(["Users", "Reports", "Polluted", "Pending", "Resolved"]);
    page.add_table(summary);
    page.add_raw("</div><div class=\"card\"><h2>Polluted reports</h2>");

    if rows.is_empty() {
        page.add_raw("<p class=\"empty\">No polluted reports.</p>");
    } else {
        let body = rows
            .iter()
            .map(|row| {
                let mut cells = vec![escape(row.username.unwrap_or("-"))];
                cells.extend(report_cells(row));
                let action = if row.report.status == crate::model::ReportStatus::Done {
                    "<button disabled>Resolved</button>".to_string()
                } else {
                    format!(
                        "<button class=\"resolve\" data-report-id=\"{}\">Mark resolved</button>",
                        row.report.id
                    )
                };
                cells.push(action);
                cells
            })
            .collect::<Vec<_>>();
        let table = Table::from(body).with_header_row([
            "Reporter",
            "Photo",
            "Category",
            "Location",
            "Status",
            "Submitted",
            "Action",
        ]);
        page.add_table(table);
    }
    page.add_raw("</div></main>");
    page.add_raw("<script src=\"/static/app.js\"></script>");

    page.to_html_string()
}
