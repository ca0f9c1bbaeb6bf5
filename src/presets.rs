//! Field tables and typed models for the console's forms.

use crate::form::{
    FieldConfig, FieldError, FieldKey, FieldLens, FormModel, OptionPair, Validator, attribute_name,
};

pub type FieldTable = &'static [(FieldKey, FieldConfig)];

const fn field(name: &'static str, rules: &'static str) -> (FieldKey, FieldConfig) {
    (FieldKey::new(name), FieldConfig::new(rules))
}

pub const LOGIN_FIELDS: FieldTable = &[
    field("email", "required|email"),
    field("password", "string|required"),
];

pub const SCHOOL_FIELDS: FieldTable = &[
    field("name", "string|required"),
    field("address", "string|required"),
    field("email", "required|email"),
    field("phone", "string|required"),
    field("website", "string|url|present"),
    field("about", "string|present"),
    field("slogan", "string|present"),
    field("principal", "required|string"),
    field("vice_principal", "string|present"),
];

pub const INVITE_FIELDS: FieldTable = &[
    field("first_name", "required|string"),
    field("last_name", "present|string"),
    field("email", "email|required"),
    field("role", "required|integer"),
    field("school", "required|integer"),
];

pub const PROFILE_FIELDS: FieldTable = &[
    field("first_name", "required|string"),
    field("last_name", "present|string"),
    field("preferred_name", "present|string"),
    field("gender", "required|string"),
    field("dob", "required|date"),
    field("email", "required|email"),
    field("mobile", "present|string"),
    field("address", "present|string"),
];

/// Accepting an invite: password pair, then the profile, with a last name
/// that becomes mandatory.
pub const INVITATION_FIELDS: FieldTable = &[
    field("password", "required|alpha_num|min:8"),
    field("confirm_password", "required|alpha_num|min:8"),
    field("first_name", "required|string"),
    field("last_name", "present|string"),
    field("preferred_name", "present|string"),
    field("gender", "required|string"),
    field("dob", "required|date"),
    field("email", "required|email"),
    field("mobile", "present|string"),
    field("address", "present|string"),
    field("last_name", "required|string"),
];

/// Creating an account on behalf of a school.
pub const ACCOUNT_FIELDS: FieldTable = &[
    field("password", "required|alpha_num|min:8"),
    field("password_confirmation", "required|alpha_num|min:8"),
    field("first_name", "required|string"),
    field("last_name", "present|string"),
    field("preferred_name", "present|string"),
    field("gender", "required|string"),
    field("dob", "required|date"),
    field("email", "required|email"),
    field("mobile", "present|string"),
    field("address", "present|string"),
    field("last_name", "required|string"),
];

pub const ROLE_FIELDS: FieldTable = &[field("roles", "required|array")];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum RoleId {
    SuperAdmin = 1,
    Admin = 2,
    Teacher = 3,
    Student = 4,
}

impl RoleId {
    pub const ALL: [RoleId; 4] = [
        RoleId::SuperAdmin,
        RoleId::Admin,
        RoleId::Teacher,
        RoleId::Student,
    ];

    pub const fn id(self) -> i64 {
        self as i64
    }

    pub const fn nice_name(self) -> &'static str {
        match self {
            RoleId::SuperAdmin => "Internal Admin",
            RoleId::Admin => "Admin",
            RoleId::Teacher => "Teacher",
            RoleId::Student => "Student",
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.id() == id)
    }
}

pub fn role_options() -> Vec<OptionPair> {
    RoleId::ALL
        .into_iter()
        .map(|role| OptionPair::new(role.nice_name(), role.id()))
        .collect()
}

pub fn gender_options() -> Vec<OptionPair> {
    vec![
        OptionPair::new("Male", "male"),
        OptionPair::new("Female", "female"),
        OptionPair::new("Other", "other"),
    ]
}

#[derive(Clone, Debug, Default, PartialEq, FormModel)]
pub struct LoginForm {
    #[field(rules = "required|email")]
    pub email: String,
    #[field(rules = "string|required")]
    pub password: String,
}

#[derive(Clone, Debug, Default, PartialEq, FormModel)]
pub struct SchoolForm {
    #[field(rules = "string|required")]
    pub name: String,
    #[field(rules = "string|required")]
    pub address: String,
    #[field(rules = "required|email")]
    pub email: String,
    #[field(rules = "string|required")]
    pub phone: String,
    #[field(rules = "string|url|present")]
    pub website: String,
    #[field(rules = "string|present")]
    pub about: String,
    #[field(rules = "string|present")]
    pub slogan: String,
    #[field(rules = "required|string")]
    pub principal: String,
    #[field(rules = "string|present")]
    pub vice_principal: String,
}

#[derive(Clone, Debug, Default, PartialEq, FormModel)]
pub struct RolesForm {
    #[field(rules = "required|array")]
    pub roles: Vec<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, FormModel)]
pub struct InviteForm {
    #[field(rules = "required|string")]
    pub first_name: String,
    #[field(rules = "present|string")]
    pub last_name: String,
    #[field(rules = "email|required")]
    pub email: String,
    #[field(rules = "required|integer")]
    pub role: Option<i64>,
    #[field(rules = "required|integer")]
    pub school: Option<i64>,
}

/// Form-level check that `confirmation` repeats `password`. The error lands
/// on the confirmation field.
pub fn confirmation_validator<T, P, C>(
    validator: Validator,
    password: P,
    confirmation: C,
) -> impl Fn(&T) -> Vec<(FieldKey, FieldError)> + Send + Sync + 'static
where
    T: FormModel,
    P: FieldLens<T, Value = String>,
    C: FieldLens<T, Value = String>,
{
    move |model: &T| {
        if password.get(model) == confirmation.get(model) {
            return Vec::new();
        }
        let key = confirmation.key();
        let attribute = attribute_name(password.key().as_str());
        let message = validator
            .i18n()
            .t_with("validation.confirmed", &[("attribute", attribute.as_str())]);
        vec![(key, FieldError::new(key.as_str(), "confirmed", message))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{
        FormController, FormOptions, FormSchema, Selection, ValidationMode, add_validation,
    };

    #[derive(Clone, Debug, Default, PartialEq, FormModel)]
    struct PasswordForm {
        #[field(rules = "required|alpha_num|min:8")]
        password: String,
        #[field(rules = "required|alpha_num|min:8")]
        confirm_password: String,
    }

    #[test]
    fn derived_configs_match_tables() {
        let derived = SchoolForm::field_configs();
        assert_eq!(derived.as_slice(), SCHOOL_FIELDS);
        assert_eq!(LoginForm::field_configs().as_slice(), LOGIN_FIELDS);
        assert_eq!(InviteForm::field_configs().as_slice(), INVITE_FIELDS);
        assert_eq!(RolesForm::field_configs().as_slice(), ROLE_FIELDS);
    }

    #[test]
    fn invitation_makes_last_name_required() {
        let schema: FormSchema = add_validation(INVITATION_FIELDS.iter().copied());
        let last_name = schema.get_by_name("last_name").expect("last_name descriptor");
        assert_eq!(last_name.rules(), "required|string");
        assert_eq!(schema.len(), 10);

        let account = add_validation(ACCOUNT_FIELDS.iter().copied());
        assert!(account.contains(FieldKey::new("password_confirmation")));
        assert!(!account.contains(FieldKey::new("confirm_password")));
    }

    #[test]
    fn role_options_carry_numeric_ids() {
        let options = role_options();
        assert_eq!(options.len(), 4);
        assert_eq!(options[1], OptionPair::new("Admin", 2));
        assert_eq!(RoleId::from_id(3), Some(RoleId::Teacher));
        assert_eq!(options[3], OptionPair::new("Student", 4));
        assert_eq!(RoleId::from_id(4), Some(RoleId::Student));
        assert_eq!(RoleId::from_id(9), None);
    }

    #[test]
    fn roles_multiselect_writes_ids() {
        let controller = FormController::new(RolesForm { roles: vec![3] }, FormOptions::default());
        let fields = RolesForm::fields();
        let binding = controller
            .bind_multiselect(fields.roles(), role_options())
            .expect("bind roles");
        assert_eq!(
            binding.selected(),
            Some(&Selection::Multi(vec![OptionPair::new("Teacher", 3)]))
        );

        let picked = Selection::Multi(vec![
            OptionPair::new("Admin", 2),
            OptionPair::new("Teacher", 3),
        ]);
        assert!(binding.change(Some(&picked)).expect("change roles"));
        assert_eq!(controller.snapshot().expect("snapshot").model.roles, vec![2, 3]);

        assert!(binding.change(None).expect("clear roles"));
        assert!(!controller.validate_form().expect("validate"));
        assert_eq!(
            controller
                .snapshot()
                .expect("snapshot")
                .errors_for(fields.roles().key())[0]
                .message(),
            "The roles field is required."
        );
    }

    #[test]
    fn invite_select_rejects_text_values() {
        let controller = FormController::new(InviteForm::default(), FormOptions::default());
        let fields = InviteForm::fields();
        let binding = controller
            .bind_select(fields.role(), role_options())
            .expect("bind role");
        assert_eq!(binding.selected(), None);

        let wrong = Selection::Single(OptionPair::new("Typo", "admin"));
        assert!(!binding.change(Some(&wrong)).expect("change role"));
        assert_eq!(controller.snapshot().expect("snapshot").model.role, None);

        let admin = Selection::Single(OptionPair::new("Admin", 2));
        assert!(binding.change(Some(&admin)).expect("change role"));
        assert_eq!(controller.snapshot().expect("snapshot").model.role, Some(2));
    }

    #[test]
    fn confirmation_mismatch_is_reported_on_confirmation() {
        let fields = PasswordForm::fields();
        let controller = FormController::new(
            PasswordForm {
                password: "secret123".into(),
                confirm_password: "secret124".into(),
            },
            FormOptions {
                validate_mode: ValidationMode::OnChange,
                ..FormOptions::default()
            },
        );
        controller
            .register_form_validator(confirmation_validator(
                Validator::new(),
                fields.password(),
                fields.confirm_password(),
            ))
            .expect("register confirmation");

        assert!(!controller.validate_form().expect("validate"));
        let snapshot = controller.snapshot().expect("snapshot");
        assert_eq!(snapshot.first_error, Some(fields.confirm_password().key()));
        assert_eq!(
            snapshot.errors_for(fields.confirm_password().key())[0].message(),
            "The password confirmation does not match."
        );

        controller
            .set(fields.confirm_password(), "secret123".into())
            .expect("fix confirmation");
        assert!(controller.validate_form().expect("validate"));
    }
}
