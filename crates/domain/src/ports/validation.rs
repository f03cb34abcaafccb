/// 手机号语法校验
pub trait PhoneValidator: Send + Sync {
    fn is_valid(&self, phone: &str) -> bool;
}

impl<F> PhoneValidator for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_valid(&self, phone: &str) -> bool {
        self(phone)
    }
}
