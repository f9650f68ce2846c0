//! Locator expressions for common HTML controls.
//!
//! Every builder returns a relative expression (`.//...`) so it resolves
//! inside whatever scope the session is in. Label lookups use absolute
//! paths inside predicates, which address the whole document: a
//! `<label for>` outside the current scope still names a field inside it.

/// Quote `value` as an XPath string literal.
///
/// Strings containing both quote kinds are spelled with `concat()`.
#[must_use]
pub fn literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{value}'")
    } else if !value.contains('"') {
        format!("\"{value}\"")
    } else {
        let parts: Vec<String> = value.split('\'').map(|part| format!("'{part}'")).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// Predicate matching a form control by id, name, placeholder or label
fn field_locator(locator: &str) -> String {
    let l = literal(locator);
    format!(
        "@id={l} or @name={l} or @placeholder={l} \
         or @id=//label[contains(normalize-space(.), {l})]/@for \
         or ancestor::label[contains(normalize-space(.), {l})]"
    )
}

/// `<a href>` by id, text, title, or the alt text of an image inside it
#[must_use]
pub fn link(locator: &str) -> String {
    let l = literal(locator);
    format!(
        ".//a[@href][@id={l} or contains(normalize-space(.), {l}) \
         or contains(@title, {l}) or .//img[contains(@alt, {l})]]"
    )
}

/// Submit, image and button inputs, and `<button>` elements
#[must_use]
pub fn button(locator: &str) -> String {
    let l = literal(locator);
    format!(
        ".//input[@type='submit' or @type='image' or @type='button']\
         [@id={l} or contains(@value, {l}) or contains(@title, {l})] \
         | .//input[@type='image'][contains(@alt, {l})] \
         | .//button[@id={l} or contains(@value, {l}) \
         or contains(normalize-space(.), {l}) or contains(@title, {l})]"
    )
}

/// Text-like inputs and textareas
#[must_use]
pub fn fillable_field(locator: &str) -> String {
    let field = field_locator(locator);
    format!(
        ".//input[not(@type='submit' or @type='image' or @type='button' \
         or @type='reset' or @type='checkbox' or @type='radio' \
         or @type='hidden' or @type='file')][{field}] \
         | .//textarea[{field}]"
    )
}

/// `<input type="checkbox">`
#[must_use]
pub fn checkbox(locator: &str) -> String {
    format!(".//input[@type='checkbox'][{}]", field_locator(locator))
}

/// `<input type="radio">`
#[must_use]
pub fn radio(locator: &str) -> String {
    format!(".//input[@type='radio'][{}]", field_locator(locator))
}

/// `<select>`
#[must_use]
pub fn select(locator: &str) -> String {
    format!(".//select[{}]", field_locator(locator))
}

/// `<option>` by visible text or value
#[must_use]
pub fn option(locator: &str) -> String {
    let l = literal(locator);
    format!(".//option[normalize-space(.)={l} or @value={l}]")
}

/// `<fieldset>` by id
#[must_use]
pub fn fieldset_by_id(id: &str) -> String {
    format!(".//fieldset[@id={}]", literal(id))
}

/// `<fieldset>` by the text of its `<legend>`
#[must_use]
pub fn fieldset_by_legend(legend: &str) -> String {
    format!(
        ".//fieldset[legend[normalize-space(.)={}]]",
        literal(legend)
    )
}

/// `<table>` by id
#[must_use]
pub fn table_by_id(id: &str) -> String {
    format!(".//table[@id={}]", literal(id))
}

/// `<table>` by the text of its `<caption>`
#[must_use]
pub fn table_by_caption(caption: &str) -> String {
    format!(
        ".//table[caption[normalize-space(.)={}]]",
        literal(caption)
    )
}
