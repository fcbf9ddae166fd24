use tera::{Context, Tera};
use tracing::debug;

/// The layout used by `render` unless the caller opts out.
pub const DEFAULT_LAYOUT: &str = "layouts/main.html";

/// Tera wrapper with the application's built-in templates registered at
/// construction. An on-disk template directory, when present, is loaded first
/// so deployments can override individual views; the built-ins fill the gaps.
/// Views are pure templating and perform no data access.
pub struct ViewEngine {
    tera: Tera,
}

impl ViewEngine {
    pub fn new(template_dir: Option<&str>) -> Result<Self, tera::Error> {
        let mut tera = match template_dir {
            Some(dir) => Tera::new(&format!("{}/**/*.html", dir)).unwrap_or_else(|_| {
                debug!("No template directory at {}, using built-in templates", dir);
                Tera::default()
            }),
            None => Tera::default(),
        };
        Self::add_builtin_templates(&mut tera)?;
        Ok(Self { tera })
    }

    /// Execute a single template. Missing templates surface as errors; the
    /// caller treats that as a fatal configuration problem.
    pub fn render(&self, name: &str, context: &Context) -> Result<String, tera::Error> {
        self.tera.render(name, context)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    fn add_builtin_templates(tera: &mut Tera) -> Result<(), tera::Error> {
        let mut templates: Vec<(&str, &str)> = Vec::new();
        for (name, body) in BUILTIN_TEMPLATES {
            if !tera.get_template_names().any(|n| n == *name) {
                templates.push((name, body));
            }
        }
        tera.add_raw_templates(templates)
    }
}

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        "layouts/main.html",
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{{ title | default(value="Storefront") }}</title>
</head>
<body>
  <nav>
    <a href="{{ base_path }}/">Home</a>
    <a href="{{ base_path }}/products">Products</a>
    {% if current_user %}
      <a href="{{ base_path }}/account">{{ current_user.username }}</a>
      {% if current_user.is_admin %}<a href="{{ base_path }}/admin">Admin</a>{% endif %}
      <form method="post" action="{{ base_path }}/logout">
        <input type="hidden" name="_token" value="{{ csrf_token }}">
        <button type="submit">Log out</button>
      </form>
    {% else %}
      <a href="{{ base_path }}/login">Log in</a>
      <a href="{{ base_path }}/register">Register</a>
    {% endif %}
  </nav>
  {% for flash in flashes %}
  <div class="flash flash-{{ flash.kind }}">{{ flash.text }}</div>
  {% endfor %}
  <main>
{{ content | safe }}
  </main>
  <footer><p>Storefront</p></footer>
</body>
</html>
"#,
    ),
    (
        "home/index.html",
        r#"<h1>Welcome to the store</h1>
<p>{{ product_count }} products available.</p>
<ul>
{% for product in featured %}
  <li><a href="{{ base_path }}/product/{{ product.id }}">{{ product.name }}</a> — {{ product.price }}</li>
{% endfor %}
</ul>
"#,
    ),
    (
        "auth/login.html",
        r#"<h1>Log in</h1>
<form method="post" action="{{ base_path }}/login">
  <input type="hidden" name="_token" value="{{ csrf_token }}">
  <label>Username <input type="text" name="username" value="{{ username | default(value="") }}"></label>
  <label>Password <input type="password" name="password"></label>
  <button type="submit">Log in</button>
</form>
"#,
    ),
    (
        "auth/register.html",
        r#"<h1>Create an account</h1>
<form method="post" action="{{ base_path }}/register">
  <input type="hidden" name="_token" value="{{ csrf_token }}">
  <label>Username <input type="text" name="username" value="{{ username | default(value="") }}"></label>
  <label>Email <input type="email" name="email" value="{{ email | default(value="") }}"></label>
  <label>Password <input type="password" name="password"></label>
  <button type="submit">Register</button>
</form>
"#,
    ),
    (
        "products/index.html",
        r#"<h1>Products</h1>
<form method="get" action="{{ base_path }}/search">
  <input type="text" name="q" value="{{ term | default(value="") }}">
  <button type="submit">Search</button>
</form>
<ul>
{% for product in products %}
  <li>
    <a href="{{ base_path }}/product/{{ product.id }}">{{ product.name }}</a>
    — {{ product.price }}{% if product.stock == 0 %} (out of stock){% endif %}
  </li>
{% endfor %}
</ul>
<p>Page {{ page }} of {{ total_pages }} ({{ total }} products)</p>
{% if page > 1 %}<a href="{{ base_path }}/products?page={{ page - 1 }}">Previous</a>{% endif %}
{% if page < total_pages %}<a href="{{ base_path }}/products?page={{ page + 1 }}">Next</a>{% endif %}
"#,
    ),
    (
        "products/show.html",
        r#"<h1>{{ product.name }}</h1>
{% if product.image %}<img src="{{ base_path }}/uploads/{{ product.image }}" alt="{{ product.name }}">{% endif %}
<p>{{ product.description }}</p>
<p>Price: {{ product.price }}</p>
<p>{% if product.stock > 0 %}{{ product.stock }} in stock{% else %}Out of stock{% endif %}</p>
"#,
    ),
    (
        "account/index.html",
        r#"<h1>Your account</h1>
<p>Username: {{ user.username }}</p>
<p>Email: {{ user.email }}</p>
<form method="post" action="{{ base_path }}/account">
  <input type="hidden" name="_token" value="{{ csrf_token }}">
  <label>Email <input type="email" name="email" value="{{ user.email }}"></label>
  <button type="submit">Update</button>
</form>
"#,
    ),
    (
        "admin/dashboard.html",
        r#"<h1>Admin</h1>
<ul>
  <li><a href="{{ base_path }}/admin/products">Products ({{ product_count }})</a></li>
  <li><a href="{{ base_path }}/admin/products/new">New product</a></li>
</ul>
"#,
    ),
    (
        "admin/products.html",
        r#"<h1>Manage products</h1>
<p><a href="{{ base_path }}/admin/products/new">New product</a></p>
<table>
{% for product in products %}
  <tr>
    <td>{{ product.id }}</td>
    <td>{{ product.name }}</td>
    <td>{{ product.price }}</td>
    <td>{{ product.stock }}</td>
    <td><a href="{{ base_path }}/admin/products/{{ product.id }}/edit">Edit</a></td>
    <td>
      <form method="post" action="{{ base_path }}/admin/products/{{ product.id }}/delete">
        <input type="hidden" name="_token" value="{{ csrf_token }}">
        <button type="submit">Delete</button>
      </form>
    </td>
  </tr>
{% endfor %}
</table>
<p>Page {{ page }} of {{ total_pages }}</p>
"#,
    ),
    (
        "admin/product_form.html",
        r#"<h1>{{ heading }}</h1>
<form method="post" action="{{ form_action }}">
  <input type="hidden" name="_token" value="{{ csrf_token }}">
  <label>Name <input type="text" name="name" value="{{ product.name | default(value="") }}"></label>
  <label>Description <textarea name="description">{{ product.description | default(value="") }}</textarea></label>
  <label>Price <input type="text" name="price" value="{{ product.price | default(value="") }}"></label>
  <label>Stock <input type="number" name="stock" value="{{ product.stock | default(value=0) }}"></label>
  <button type="submit">Save</button>
</form>
"#,
    ),
    (
        "errors/404.html",
        r#"<h1>Page not found</h1>
<p>The page you requested does not exist.</p>
<p><a href="{{ base_path }}/">Back to the store</a></p>
"#,
    ),
    (
        "errors/500.html",
        r#"<h1>Something went wrong</h1>
<p>An unexpected error occurred. Please try again later.</p>
"#,
    ),
    (
        "errors/500_debug.html",
        r#"<h1>Internal error</h1>
<pre>{{ detail }}</pre>
"#,
    ),
];
