use std::fs;
use std::path::Path;

use sitekit_cli::project::{build_site, has_errors, load_project};
use tempfile::TempDir;

const CONFIG: &str = "site:
  title: Acme
  base_url: https://acme.example/
nav:
  items:
    - { label: News, href: /news/ }
    - { label: About, href: /about/ }
language_map:
  - [\"/about/\", \"/ru/o-nas/\"]
collections:
  tags:
    template: tag.html
  jobs:
    template: job.html
passthrough:
  - static/img
  - { from: admin/config.yml, to: admin/config.yml }
syntax:
  css_output: css/highlight.css
";

const BASE: &str = "<!DOCTYPE html>
<html lang=\"{{ page.lang }}\">
<head>
  <title>{{ page.title }} | {{ site.title }}</title>
</head>
<body>
  <nav>
    {% for item in nav %}<a href=\"{{ item.href }}\"{% if item.is_active %} class=\"active\"{% endif %}>{{ item.label }}</a>
    {% endfor %}
  </nav>
  <a class=\"lang\" href=\"{{ alternate_url }}\">switch</a>
  <main>
    {{ content }}
  </main>
</body>
</html>
";

fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create dirs");
    }
    fs::write(path, contents).expect("write file");
}

fn write_site(root: &Path) {
    write_file(&root.join("site.yaml"), CONFIG);
    write_file(&root.join("templates/base.html"), BASE);
    write_file(
        &root.join("templates/tag.html"),
        "<h1>Tag {{ tag.tag }}</h1>{% for post in tag.posts %}<a href=\"{{ post.url }}\">{{ post.title }}</a>{% endfor %}",
    );
    write_file(
        &root.join("templates/job.html"),
        "<article><h1>{{ page.title }}</h1>{{ content }}</article>",
    );
    write_file(
        &root.join("src/index.html"),
        "---\ntitle: Home\n---\n<p>Latest: {% for post in collections.news | limit(1) %}{{ post.title }}{% endfor %}</p>\n",
    );
    write_file(&root.join("src/about.md"), "---\ntitle: About\n---\nWe build things.\n");
    write_file(&root.join("src/ru/o-nas.md"), "---\ntitle: О нас\n---\nМы строим.\n");
    write_file(
        &root.join("src/news/posts/first.md"),
        "---\ntitle: First\ndate: 2024-01-01\ntags: [release]\n---\nFirst post.\n",
    );
    write_file(
        &root.join("src/news/posts/second.md"),
        "---\ntitle: Second\ndate: 2024-02-01\ntags: [release, infra]\n---\nSecond post.\n",
    );
    write_file(
        &root.join("src/careers/jobs/senior-engineer.md"),
        "---\ntitle: Senior Engineer\ndate: 2024-05-01\n---\n## Role\n",
    );
    write_file(&root.join("src/_drafts/wip.md"), "not published");
    write_file(&root.join("static/img/logo.svg"), "<svg/>");
    write_file(&root.join("admin/config.yml"), "backend: git\n");
}

fn read(out: &Path, rel: &str) -> String {
    fs::read_to_string(out.join(rel)).unwrap_or_else(|err| panic!("read {rel}: {err}"))
}

#[test]
fn full_build_writes_pages_collections_and_passthrough() {
    let temp = TempDir::new().expect("tempdir");
    let root = temp.path();
    write_site(root);

    let project = load_project(root).expect("load project");
    assert!(!has_errors(&project), "{:?}", project.content.diagnostics);
    assert_eq!(project.content.pages.len(), 5);
    assert_eq!(project.content.collections.news.len(), 2);
    assert_eq!(project.content.collections.jobs.len(), 1);

    let out = root.join("_site");
    let report = build_site(&project, &out).expect("build");
    assert_eq!(report.copied, 2);

    let index = read(&out, "index.html");
    assert!(index.starts_with("<!doctype html>"), "{index}");
    assert!(index.contains("Latest: Second"), "{index}");
    assert!(!index.contains("\n  "), "minified output keeps indentation: {index}");

    let about = read(&out, "about/index.html");
    assert!(about.contains("We build things."));
    assert!(about.contains("About | Acme"));
    assert!(about.contains("/ru/o-nas/"), "{about}");

    let ru = read(&out, "ru/o-nas/index.html");
    assert!(ru.contains("Мы строим."));
    assert!(ru.contains("/about/"), "{ru}");

    let second = read(&out, "news/posts/second/index.html");
    assert!(second.contains("Second post."));
    assert!(second.contains("class=active") || second.contains("class=\"active\""), "{second}");

    let release = read(&out, "tags/release/index.html");
    assert!(release.contains("Tag release"));
    assert!(release.find("Second").expect("second") < release.find("First").expect("first"));
    assert!(out.join("tags/infra/index.html").exists());

    let job = read(&out, "careers/jobs/senior-engineer/index.html");
    assert!(job.contains("Senior Engineer"));
    assert!(job.contains("Role"));

    assert_eq!(read(&out, "static/img/logo.svg"), "<svg/>");
    assert_eq!(read(&out, "admin/config.yml"), "backend: git\n");
    assert!(!read(&out, "css/highlight.css").is_empty());
    assert!(!out.join("_drafts").exists());
}

#[test]
fn tidy_mode_formats_instead_of_minifying() {
    let temp = TempDir::new().expect("tempdir");
    let root = temp.path();
    write_site(root);
    let config = format!("{CONFIG}postprocess:\n  mode: tidy\n");
    write_file(&root.join("site.yaml"), &config);

    let project = load_project(root).expect("load project");
    let out = root.join("_site");
    build_site(&project, &out).expect("build");
    let about = read(&out, "about/index.html");
    assert!(about.starts_with("<!doctype html>\n<html lang=\"en\">\n"), "{about}");
    assert!(about.contains("\n<main>\n"), "{about}");
    assert!(about.lines().all(|line| line == line.trim_end()));
}

#[test]
fn duplicate_urls_are_reported_as_errors() {
    let temp = TempDir::new().expect("tempdir");
    let root = temp.path();
    write_site(root);
    write_file(&root.join("src/about/index.html"), "<p>again</p>");

    let project = load_project(root).expect("load project");
    assert!(has_errors(&project));
}

#[test]
fn missing_jobs_dir_only_warns() {
    let temp = TempDir::new().expect("tempdir");
    let root = temp.path();
    write_site(root);
    fs::remove_dir_all(root.join("src/careers")).expect("remove jobs");

    let project = load_project(root).expect("load project");
    assert!(!has_errors(&project));
    assert_eq!(project.content.diagnostics.len(), 1);
    assert!(project.content.collections.jobs.is_empty());
}

#[test]
fn global_data_files_feed_templates_and_are_not_published() {
    let temp = TempDir::new().expect("tempdir");
    let root = temp.path();
    write_site(root);
    write_file(&root.join("src/_data/company.yaml"), "phone: \"+1 555 0100\"\n");
    write_file(&root.join("src/_data/company/address.yml"), "city: Springfield\n");
    write_file(
        &root.join("src/contact.html"),
        "---\ntitle: Contact\n---\n<p>{{ data.company.phone }}, {{ data.company.address.city }}</p>\n",
    );

    let project = load_project(root).expect("load project");
    assert!(project.content.diagnostics.is_empty(), "{:?}", project.content.diagnostics);
    let out = root.join("_site");
    build_site(&project, &out).expect("build");
    let contact = read(&out, "contact/index.html");
    assert!(contact.contains("+1 555 0100, Springfield"), "{contact}");
    assert!(!out.join("_data").exists());
}

#[test]
fn broken_global_data_only_warns() {
    let temp = TempDir::new().expect("tempdir");
    let root = temp.path();
    write_site(root);
    write_file(&root.join("src/_data/broken.yaml"), "key: [unclosed\n");

    let project = load_project(root).expect("load project");
    assert!(!has_errors(&project));
    assert_eq!(project.content.diagnostics.len(), 1);
    assert!(project.content.global_data.is_empty());
}
