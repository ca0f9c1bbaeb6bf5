#[derive(Clone, schoolform::form::FormModel)]
struct Credentials(String, String);

fn main() {
    let credentials = Credentials("a@school.edu".to_string(), String::new());
    let _ = (credentials.0, credentials.1);
}
