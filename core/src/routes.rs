//! Every backend path, defined once.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiRoute {
    AuthLogin,
    AuthRegister,
    AuthSendOtp,
    AuthCheckValidToken,
    AuthLogout,
    UserShowMe,
    File,
    Sheet,
    SheetFromFile,
    Website,
    WebsiteEditSheet,
    WebsiteEditDetail,
}

impl ApiRoute {
    pub const ALL: [ApiRoute; 12] = [
        ApiRoute::AuthLogin,
        ApiRoute::AuthRegister,
        ApiRoute::AuthSendOtp,
        ApiRoute::AuthCheckValidToken,
        ApiRoute::AuthLogout,
        ApiRoute::UserShowMe,
        ApiRoute::File,
        ApiRoute::Sheet,
        ApiRoute::SheetFromFile,
        ApiRoute::Website,
        ApiRoute::WebsiteEditSheet,
        ApiRoute::WebsiteEditDetail,
    ];

    pub fn path(self) -> &'static str {
        match self {
            ApiRoute::AuthLogin => "/auth/login",
            ApiRoute::AuthRegister => "/auth/userRegister",
            ApiRoute::AuthSendOtp => "/auth/sendOTP",
            ApiRoute::AuthCheckValidToken => "/auth/checkValidToken",
            ApiRoute::AuthLogout => "/auth/logout",
            ApiRoute::UserShowMe => "/users/showMe",
            ApiRoute::File => "/file",
            ApiRoute::Sheet => "/sheet",
            ApiRoute::SheetFromFile => "/sheet/file",
            ApiRoute::Website => "/website",
            ApiRoute::WebsiteEditSheet => "/website/sheet",
            ApiRoute::WebsiteEditDetail => "/website/detail",
        }
    }

    /// Path plus a form-urlencoded query string.
    pub fn with_query(self, pairs: &[(&str, &str)]) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        if query.is_empty() {
            self.path().to_string()
        } else {
            format!("{}?{query}", self.path())
        }
    }
}

impl fmt::Display for ApiRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl From<ApiRoute> for String {
    fn from(route: ApiRoute) -> Self {
        route.path().to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn paths_are_unique_and_absolute() {
        let paths: HashSet<&str> = ApiRoute::ALL.iter().map(|r| r.path()).collect();
        assert_eq!(paths.len(), ApiRoute::ALL.len());
        assert!(paths.iter().all(|p| p.starts_with('/')));
    }

    #[test]
    fn with_query_encodes_values() {
        assert_eq!(
            ApiRoute::SheetFromFile.with_query(&[("fileId", "abc")]),
            "/sheet/file?fileId=abc"
        );
        assert_eq!(
            ApiRoute::SheetFromFile.with_query(&[("fileId", "a b&c")]),
            "/sheet/file?fileId=a+b%26c"
        );
        assert_eq!(ApiRoute::File.with_query(&[]), "/file");
    }
}
