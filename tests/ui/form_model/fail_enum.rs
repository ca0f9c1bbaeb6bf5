#[derive(Clone, schoolform::form::FormModel)]
enum Role {
    Admin,
    Teacher,
}

fn main() {
    let _ = [Role::Admin, Role::Teacher];
}
