//! Plain-text regression summaries

use crate::OlsFit;
use std::fmt;

const WIDTH: usize = 78;

impl OlsFit {
    /// Regression summary in the familiar OLS results layout
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for OlsFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heavy = "=".repeat(WIDTH);
        let light = "-".repeat(WIDTH);
        let title = format!("OLS Regression Results: {}", self.equation);

        writeln!(f, "{title:^WIDTH$}")?;
        writeln!(f, "{heavy}")?;

        let left = [
            ("Dep. Variable:", self.dependent.clone()),
            ("Model:", "OLS".to_string()),
            ("Method:", "Least Squares".to_string()),
            ("No. Observations:", self.n_obs.to_string()),
            ("Df Residuals:", format!("{}", self.df_resid)),
            ("Df Model:", format!("{}", self.df_model)),
            ("", String::new()),
        ];
        let right = [
            ("R-squared:", format!("{:.3}", self.r_squared)),
            ("Adj. R-squared:", format!("{:.3}", self.adj_r_squared)),
            ("F-statistic:", format!("{:.4}", self.f_stat)),
            ("Prob (F-statistic):", format!("{:.3e}", self.f_p_value)),
            ("Log-Likelihood:", format!("{:.3}", self.log_likelihood)),
            ("AIC:", format!("{:.4}", self.aic)),
            ("BIC:", format!("{:.4}", self.bic)),
        ];
        for ((l_label, l_value), (r_label, r_value)) in left.iter().zip(right.iter()) {
            writeln!(f, "{l_label:<20}{l_value:>18}   {r_label:<20}{r_value:>16}")?;
        }

        writeln!(f, "{heavy}")?;
        writeln!(
            f,
            "{:<16}{:>10}{:>11}{:>10}{:>9}{:>11}{:>11}",
            "", "coef", "std err", "t", "P>|t|", "[0.025", "0.975]"
        )?;
        writeln!(f, "{light}")?;
        for (j, name) in self.names.iter().enumerate() {
            writeln!(
                f,
                "{:<16}{:>10.4}{:>11.3}{:>10.3}{:>9.3}{:>11.3}{:>11.3}",
                truncate(name, 15),
                self.params[j],
                self.std_errors[j],
                self.t_values[j],
                self.p_values[j],
                self.conf_int[j].0,
                self.conf_int[j].1,
            )?;
        }
        write!(f, "{heavy}")?;
        if self.rank < self.names.len() {
            write!(
                f,
                "\nNote: design rank {} < {} parameters; minimum-norm solution reported.",
                self.rank,
                self.names.len()
            )?;
        }
        Ok(())
    }
}

fn truncate(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        name.to_string()
    } else {
        let head: String = name.chars().take(max - 1).collect();
        format!("{head}~")
    }
}
