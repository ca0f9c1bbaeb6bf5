use schoolform::form::{FieldLens, FieldValue, FormModel};

#[derive(Clone, schoolform::form::FormModel)]
struct DemoForm {
    #[field(rules = "required|email", id = "demo-email")]
    email: String,
    nickname: String,
}

fn main() {
    let fields = DemoForm::fields();
    let lens = fields.email();
    let mut model = DemoForm {
        email: "a@school.edu".to_string(),
        nickname: String::new(),
    };
    lens.set(&mut model, "b@school.edu".to_string());
    assert_eq!(lens.key().as_str(), "email");
    assert_eq!(lens.get(&model), "b@school.edu");
    assert_eq!(model.field_value(lens.key()), FieldValue::text("b@school.edu"));

    let configs = DemoForm::field_configs();
    assert_eq!(configs[0].1.id, Some("demo-email"));
    assert_eq!(configs[1].1.rules, "");

    let schema = DemoForm::schema();
    assert!(schema.get(fields.email().key()).is_some_and(|field| field.is_required()));
    assert!(schema.get(fields.nickname().key()).is_some_and(|field| !field.is_required()));
}
