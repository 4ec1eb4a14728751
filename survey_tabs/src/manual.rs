/*!

This is the long-form manual for `survey_tabs` and `svtab`.

## Input format

The survey data comes as an Excel workbook (.xlsx) with three sheets:
* `Database` one row per respondent. The first row holds the variable codes.
  One of the columns is the grouping dimension (`District` by default).
* `Key` the labels of the variables, in the columns `Variables` and `TEXT`.
* `Key_MRQ` (optional) the labels of the multi-response questions and of their
  options, in the columns `Variable` and `TEXT`. When it is absent, a warning is
  emitted and the labels come from `Key` only.

Cells are read as numbers, text or booleans. Empty cells, empty strings and
error cells are missing values.

## Derived variables

Two derivations run once, when the data is loaded, before any tabulation:
* `ageClass` bins an age in months into `0–3 Months`, `4–7 Months` and
  `8–11 Months`. **Records whose age is not a number or falls outside
  [0, 11] are removed from the dataset**, for every tabulation of the report.
* `visitCap` turns a count of visits into `0` … `7` and `8 and above`.
  Non-numeric and negative counts are 0.

## Multi-response questions

A column whose code ends with an underscore and digits (`BF4_1`, `BF4_2`, …)
is an option of the question named by the prefix (`BF4`). An option is
selected when its cell is the number 1, the boolean true, or the text `1`,
`yes` or `true` (whitespace and case ignored). Everything else is not selected.

## Tables

Every table has the grouping values as columns, followed by `Total`, each with
a count `N` and a percentage `%` rounded to one decimal.

* For a categorical variable, the percentages are computed over the column
  totals. The `Total` row holds the column totals.
* For a multi-response question, the percentages are computed over the number
  of respondents of the column who selected at least one option. The `Total`
  row holds these numbers. Since respondents may select several options, the
  percentages of a column may add up to more than 100%.

The `Total` row always shows `100.0%`. A percentage over an empty base is `0.0%`.

Records without a grouping value are not counted in any table.

A number and a text spelling it the same way (`1` and `"1"`) share a row. Text
such as `"01"` has its own row.

## Filtering

Selecting districts restricts the records to these districts. Selecting no
district at all means no filtering: every district is shown.

## Output formats

* `csv` one file per table, with two header rows (the title and the grouping
  values, then `N` and `%`) followed by one row per category and the `Total` row.
* `html` a single page with all the tables. The `Total` row and column stand out.
* `json` the tables and the data of the grouped bar charts.

*/
