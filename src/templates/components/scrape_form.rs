use maud::{html, Markup, PreEscaped};

// Posts the form in the background and shows the JSON reply in #scrape-result.
const SUBMIT_SCRIPT: &str = r#"
document.getElementById("scrape-form").addEventListener("submit", async (event) => {
  event.preventDefault();
  const form = event.target;
  const out = document.getElementById("scrape-result");
  const button = form.querySelector("button");
  button.disabled = true;
  out.textContent = "Scraping, this can take a few minutes...";
  try {
    const resp = await fetch(form.action, { method: "POST", body: new FormData(form) });
    const reply = await resp.json();
    out.textContent = reply.message;
    if (reply.download_url) {
      const link = document.createElement("a");
      link.href = reply.download_url;
      link.textContent = " Download workbook";
      out.appendChild(link);
    }
  } catch (err) {
    out.textContent = "Request failed: " + err;
  } finally {
    button.disabled = false;
  }
});
"#;

/// Search URL plus an optional previous workbook to reconcile against.
pub fn scrape_form() -> Markup {
    html! {
        form
            id="scrape-form"
            method="post"
            action="/scrape"
            enctype="multipart/form-data"
            class="scrape-form"
        {
            label for="url" { "Property Search URL" }
            input
                type="url"
                id="url"
                name="url"
                placeholder="https://www.example.sg/property-for-sale?..."
                required;

            label for="file" { "Previous workbook (optional)" }
            input
                type="file"
                id="file"
                name="file"
                accept=".xlsx";

            button type="submit" class="btn" { "Scrape and update" }
        }
        p id="scrape-result" role="status" {}
        script { (PreEscaped(SUBMIT_SCRIPT)) }
    }
}
